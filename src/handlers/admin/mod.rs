pub mod uploads;
pub mod users;

pub use uploads::{delete_upload, list_uploads};
pub use users::{create_user, delete_user, list_users};
