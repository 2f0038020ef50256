mod validator;

pub use validator::{classify, validate, Validation};
