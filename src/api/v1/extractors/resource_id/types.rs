/**
 * Responsibility
 *  - リソースごとの「意味付きID型」を宣言する
 *  - path parameter 名との対応もここで決める (routes.rs と揃えること)
 */
use super::core::{IdTag, ResourceId};

// users
pub enum UserTag {}
impl IdTag for UserTag {
    const PARAM: &'static str = "user_id";
    const RESOURCE: &'static str = "user";
}
pub type UserId = ResourceId<UserTag>;

// clients
pub enum ClientTag {}
impl IdTag for ClientTag {
    const PARAM: &'static str = "client_id";
    const RESOURCE: &'static str = "client";
}
pub type ClientId = ResourceId<ClientTag>;

// groups
pub enum GroupTag {}
impl IdTag for GroupTag {
    const PARAM: &'static str = "group_id";
    const RESOURCE: &'static str = "group";
}
pub type GroupId = ResourceId<GroupTag>;
