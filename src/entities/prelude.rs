pub use super::search_records::Entity as SearchRecords;
pub use super::users::Entity as Users;
