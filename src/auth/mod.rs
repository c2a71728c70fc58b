mod password;

pub use password::PasswordHasher;
