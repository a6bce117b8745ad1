//! Handler functions for the account page.

use crate::{
    auth::Viewer,
    errors::AppError,
    services::{context::Rendered, pages},
};

pub async fn account(viewer: Viewer) -> Result<Rendered, AppError> {
    pages::account(&viewer)
}
