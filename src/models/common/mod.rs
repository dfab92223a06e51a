pub mod pagination;
pub mod response;
pub mod validation;

pub use pagination::{PaginatedResponse, PaginationInfo, PaginationQuery};
pub use response::ApiResponse;
pub use validation::FieldErrors;
