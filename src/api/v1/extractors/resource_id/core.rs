/*
 * Responsibility
 * - Path の String を UUID として受け、リソースごとの型付き ID に変換する
 * - 失敗時は AppError (400 INVALID_ID) へ変換
 * 置くもの
 *  - ResourceId<T> の定義（ジェネリック本体）
 *  - impl FromRequestParts for ResourceId<T>
 * 置かないもの
 *  - User / Client といった具体リソース名 (types 側)
 */
use std::collections::HashMap;
use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

use crate::error::AppError;

/// Binds a resource tag to the path parameter it is read from.
pub trait IdTag {
    const PARAM: &'static str;
    const RESOURCE: &'static str;
}

pub struct ResourceId<T> {
    pub id: Uuid,
    _marker: PhantomData<T>,
}

impl<T> ResourceId<T> {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for ResourceId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResourceId<T> {}

impl<T, S> FromRequestParts<S> for ResourceId<T>
where
    T: IdTag + Send + Sync,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("INVALID_ID", "invalid path"))?;

        let raw = params
            .get(T::PARAM)
            .ok_or_else(|| AppError::bad_request("INVALID_ID", format!("missing {} id", T::RESOURCE)))?;

        Uuid::parse_str(raw)
            .map(Self::new)
            .map_err(|_| AppError::bad_request("INVALID_ID", format!("invalid {} id", T::RESOURCE)))
    }
}

impl<T: IdTag> std::fmt::Debug for ResourceId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceId")
            .field("resource", &T::RESOURCE)
            .field("id", &self.id)
            .finish()
    }
}
