//! Template contexts and the rendered page they produce.

use adapters::Page;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<&mut Self, serde_json::Error> {
        self.0.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Adds the object list under `name` and `object_list`, plus the
    /// `page_obj`, `paginator` and `is_paginated` navigation entries.
    pub fn paginate<T: Serialize>(
        &mut self,
        name: &str,
        page: &Page<T>,
    ) -> Result<&mut Self, serde_json::Error> {
        let num_pages = page.num_pages();
        self.set(name, &page.items)?
            .set("object_list", &page.items)?
            .set(
                "page_obj",
                &json!({
                    "number": page.number,
                    "has_next": page.has_next(),
                    "has_previous": page.has_previous(),
                    "next_page_number": page.has_next().then(|| page.number + 1),
                    "previous_page_number": page.has_previous().then(|| page.number - 1),
                }),
            )?
            .set(
                "paginator",
                &json!({
                    "count": page.total,
                    "num_pages": num_pages,
                    "per_page": page.per_page,
                }),
            )?
            .set("is_paginated", &(num_pages > 1))
    }
}

/// A template name plus the context it is rendered with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendered {
    pub template: &'static str,
    pub context: Context,
}

impl Rendered {
    pub fn new(template: &'static str, context: Context) -> Self {
        Self { template, context }
    }
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
