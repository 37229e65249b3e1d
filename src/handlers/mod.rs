// Route handlers, grouped by security tier: everything under admin/ sits
// behind the credential-verification middleware.
pub mod admin;
