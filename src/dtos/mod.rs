pub mod chatdtos;
pub mod labordtos;
pub mod userdtos;
pub mod verificationdtos;
