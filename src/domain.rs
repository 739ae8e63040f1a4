//! Domain types
//!
//! Catalog records, the department context of the temporary list, the
//! reservation dialog state and the wire shapes of the backend endpoints.

pub mod department;
pub mod product;
pub mod reservation;
pub mod search;
pub mod temp_list;

pub use department::DepartmentContext;
pub use product::{DepartmentId, ProductId, ProductRecord};
pub use reservation::{QuantityError, ReservationIntent, StepOutcome};
pub use search::{SearchPage, SearchRequest};
pub use temp_list::{
    CheckoutResponse, DepartmentSnapshot, ListItem, ListMutation, ListSnapshot, ListStatus,
    MutationResponse,
};
