//! OpenAPI document for every REST endpoint.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::handlers::{auth, feed, groups, leads, notifications, profile, settings, system};

/// Generated OpenAPI specification, served by Swagger UI at `/swagger-ui`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "leadswipe",
        description = "Swipe feed for reviewing sales leads sourced from Facebook groups."
    ),
    paths(
        system::health_handler,
        auth::sign_in,
        auth::sign_out,
        feed::current,
        feed::load,
        feed::refresh,
        feed::drag,
        feed::swipe,
        feed::save,
        feed::block,
        feed::skip,
        feed::restore,
        feed::preferences,
        feed::theme,
        leads::list_leads,
        leads::blocked_leads,
        leads::get_lead,
        leads::apply_action,
        leads::stats,
        notifications::list_notifications,
        notifications::unread_count,
        notifications::mark_read,
        notifications::mark_all_read,
        notifications::delete_notification,
        groups::list_groups,
        groups::add_group,
        groups::remove_group,
        settings::get_settings,
        settings::update_settings,
        profile::get_profile,
        profile::update_profile,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "System", description = "Health"),
        (name = "Auth", description = "Sign-in sessions"),
        (name = "Feed", description = "Swipe feed of unseen leads"),
        (name = "Leads", description = "Lead tables and membership actions"),
        (name = "Notifications", description = "Match notifications"),
        (name = "Groups", description = "Linked Facebook groups"),
        (name = "Settings", description = "Stored user settings"),
        (name = "Profile", description = "Display name and avatar"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme the handlers refer to.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_feed_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/feed/swipe"));
        assert!(doc.paths.paths.contains_key("/auth/sign-in"));
        let has_bearer = doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer"));
        assert!(has_bearer);
    }
}
