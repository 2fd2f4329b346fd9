//! OpenAPI specification for the REST surface.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hivebase API",
        version = "0.1.0",
        description = "Multi-tenant application platform.\n\nTenant selection: `organization` query parameter, else subdomain, else the default tenant.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Operations", description = "Health, readiness, and liveness probes"),
        (name = "Users", description = "User and role management, tenant-scoped"),
        (name = "Units", description = "Extension and plugin catalog and toggles"),
        (name = "Tenants", description = "Tenant registry and database binds"),
        (name = "Settings", description = "Per-tenant settings"),
        (name = "Admin", description = "Audit log, sessions, bind registry"),
    ),
    paths(
        // Operations
        crate::rest::health,
        crate::rest::readiness,
        crate::rest::liveness,
        // Users and roles
        crate::rest::list_users,
        crate::rest::create_user,
        crate::rest::get_user,
        crate::rest::update_user,
        crate::rest::delete_user,
        crate::rest::list_roles,
        crate::rest::create_role,
        // Units
        crate::unit_rest::list_extensions,
        crate::unit_rest::list_plugins,
        crate::unit_rest::set_extension_enabled,
        crate::unit_rest::set_plugin_enabled,
        crate::unit_rest::sync_units,
        // Tenants and settings
        crate::admin_rest::list_tenants,
        crate::admin_rest::create_tenant,
        crate::admin_rest::get_tenant,
        crate::admin_rest::update_tenant,
        crate::admin_rest::delete_tenant,
        crate::admin_rest::list_settings,
        crate::admin_rest::put_setting,
        // Admin
        crate::admin_rest::recent_audit,
        crate::admin_rest::session_stats,
        crate::admin_rest::list_binds,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::rest::HealthResponse,
        crate::rest::CreateUserRequest,
        crate::rest::UpdateUserRequest,
        crate::rest::CreateRoleRequest,
        crate::unit_rest::SetEnabledRequest,
        crate::admin_rest::CreateTenantRequest,
        crate::admin_rest::UpdateTenantRequest,
        crate::admin_rest::PutSettingRequest,
        hivebase_units::SyncReport,
    ))
)]
pub struct ApiDoc;
