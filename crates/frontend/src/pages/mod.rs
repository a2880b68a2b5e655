mod login;
mod success;

pub use login::LoginPage;
pub use success::SuccessPage;
