mod driver;
mod keygen_sign;
mod misbehaviour;
mod serde;
mod timeout;
mod wire;
