//! Polynomials over the scalar field and "in the exponent"
//!
//! [`Polynomial`] is the secret of a dealer in Feldman VSS: $f(x) = a_0 + a_1 x + \dots + a_t x^t$.
//! [`ExponentPolynomial`] is its public commitment $F = (a_0 G, \dots, a_t G)$ that lets anyone
//! compute $f(x) G$ without knowing $f$.

use generic_ec::{Point, Scalar, SecretScalar};
use rand_core::{CryptoRng, RngCore};

use crate::{
    ciphersuite::{random_scalar, Curve},
    PartyId,
};

/// Polynomial with secret coefficients
///
/// Coefficients are zeroized on drop.
#[derive(Clone)]
pub struct Polynomial {
    coefficients: Vec<SecretScalar<Curve>>,
}

impl Polynomial {
    /// Samples a random polynomial of given `degree` with constant term set to `secret`
    pub fn sample(
        rng: &mut (impl RngCore + CryptoRng),
        degree: u16,
        secret: SecretScalar<Curve>,
    ) -> Self {
        let coefficients = core::iter::once(secret)
            .chain(core::iter::repeat_with(|| random_scalar(rng)).take(degree.into()))
            .collect();
        Self { coefficients }
    }

    /// Constructs a polynomial from its coefficients, starting from the constant term
    pub fn from_coefficients(
        coefficients: Vec<SecretScalar<Curve>>,
    ) -> Result<Self, PolynomialError> {
        if coefficients.is_empty() {
            return Err(PolynomialError::Empty);
        }
        Ok(Self { coefficients })
    }

    /// Degree of the polynomial
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Constant term, i.e. the shared secret
    pub fn constant(&self) -> &SecretScalar<Curve> {
        &self.coefficients[0]
    }

    /// Evaluates the polynomial at the point corresponding to party `id`
    pub fn evaluate(&self, id: PartyId) -> SecretScalar<Curve> {
        let mut value = self.horner(&id.to_scalar());
        SecretScalar::new(&mut value)
    }

    /// Evaluates the polynomial at arbitrary non-zero `x`
    ///
    /// Evaluation at zero would reveal the secret, so it's refused.
    pub fn evaluate_scalar(&self, x: &Scalar<Curve>) -> Result<SecretScalar<Curve>, PolynomialError> {
        if *x == Scalar::zero() {
            return Err(PolynomialError::ZeroIndex);
        }
        let mut value = self.horner(x);
        Ok(SecretScalar::new(&mut value))
    }

    fn horner(&self, x: &Scalar<Curve>) -> Scalar<Curve> {
        self.coefficients
            .iter()
            .rev()
            .fold(Scalar::zero(), |acc, a_i| acc * x + a_i.as_ref())
    }

    /// Commits to the polynomial by multiplying each coefficient by the generator
    pub fn commit(&self) -> ExponentPolynomial {
        ExponentPolynomial {
            coefficients: self
                .coefficients
                .iter()
                .map(|a_i| Point::generator() * a_i)
                .collect(),
        }
    }
}

impl core::fmt::Debug for Polynomial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Polynomial")
            .field("degree", &self.degree())
            .finish_non_exhaustive()
    }
}

/// Polynomial with coefficients in the group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExponentPolynomial {
    coefficients: Vec<Point<Curve>>,
}

impl ExponentPolynomial {
    /// Constructs exponent polynomial from its coefficients, starting from the constant term
    pub fn new(coefficients: Vec<Point<Curve>>) -> Result<Self, PolynomialError> {
        if coefficients.is_empty() {
            return Err(PolynomialError::Empty);
        }
        Ok(Self { coefficients })
    }

    /// Degree of the polynomial
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Number of coefficients, i.e. `degree + 1`
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// Always returns `false`: polynomial has at least one coefficient
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Coefficients, starting from the constant term
    pub fn coefficients(&self) -> &[Point<Curve>] {
        &self.coefficients
    }

    /// Constant term: public key corresponding to the secret of the committed polynomial
    pub fn constant(&self) -> Point<Curve> {
        self.coefficients[0]
    }

    /// Evaluates the polynomial at the point corresponding to party `id`
    ///
    /// Computes powers $x^0, \dots, x^t$ and performs a single (variable-time) multiscalar
    /// multiplication. It's the fastest of available strategies.
    pub fn evaluate(&self, id: PartyId) -> Point<Curve> {
        let x = id.to_scalar();
        let powers = core::iter::successors(Some(Scalar::<Curve>::one()), |x_i| Some(*x_i * x))
            .take(self.coefficients.len())
            .collect::<Vec<_>>();
        Scalar::multiscalar_mul(powers.iter().zip(&self.coefficients))
    }

    /// Evaluates the polynomial by Horner's method
    pub fn evaluate_horner(&self, id: PartyId) -> Point<Curve> {
        let x = id.to_scalar();
        self.coefficients
            .iter()
            .rev()
            .fold(Point::zero(), |acc, a_i| acc * x + *a_i)
    }

    /// Evaluates the polynomial term by term
    pub fn evaluate_naive(&self, id: PartyId) -> Point<Curve> {
        let x = id.to_scalar();
        let mut x_i = Scalar::<Curve>::one();
        let mut sum = Point::zero();
        for a_i in &self.coefficients {
            sum = sum + *a_i * x_i;
            x_i *= &x;
        }
        sum
    }

    /// Adds two polynomials coefficient-wise
    pub fn add(&self, other: &Self) -> Result<Self, PolynomialError> {
        if self.coefficients.len() != other.coefficients.len() {
            return Err(PolynomialError::LengthMismatch {
                lhs: self.coefficients.len(),
                rhs: other.coefficients.len(),
            });
        }
        Ok(Self {
            coefficients: self
                .coefficients
                .iter()
                .zip(&other.coefficients)
                .map(|(a, b)| *a + *b)
                .collect(),
        })
    }

    /// Adds `other` into `self` in place
    pub fn add_assign(&mut self, other: &Self) -> Result<(), PolynomialError> {
        if self.coefficients.len() != other.coefficients.len() {
            return Err(PolynomialError::LengthMismatch {
                lhs: self.coefficients.len(),
                rhs: other.coefficients.len(),
            });
        }
        for (a, b) in self.coefficients.iter_mut().zip(&other.coefficients) {
            *a = *a + *b;
        }
        Ok(())
    }

    /// Sums a list of polynomials of the same length
    pub fn sum<'a>(polynomials: impl IntoIterator<Item = &'a Self>) -> Result<Self, PolynomialError> {
        let mut polynomials = polynomials.into_iter();
        let mut sum = polynomials.next().ok_or(PolynomialError::Empty)?.clone();
        for p in polynomials {
            sum.add_assign(p)?;
        }
        Ok(sum)
    }
}

/// Polynomial operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolynomialError {
    /// Evaluation at zero is forbidden as it reveals the secret
    #[error("polynomial evaluation at zero is forbidden")]
    ZeroIndex,
    /// Polynomials have different number of coefficients
    #[error("polynomials have different lengths: {lhs} != {rhs}")]
    LengthMismatch {
        /// Length of the left operand
        lhs: usize,
        /// Length of the right operand
        rhs: usize,
    },
    /// Polynomial must have at least one coefficient
    #[error("no coefficients")]
    Empty,
}
