pub mod chatmodels;
pub mod labourmodel;
pub mod usermodel;
pub mod verificationmodels;
