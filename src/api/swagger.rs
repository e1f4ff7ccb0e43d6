use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lab Survey Service API",
        version = "1.0.0",
        description = "Callable functions for the lab assignment survey.\n\nEvery callable takes `{\"data\": <payload>}` and answers `{\"result\": <value>}`; malformed payloads get `{\"error\": {\"status\", \"message\"}}`.",
        contact(
            name = "Lab Survey Management Team"
        )
    ),
    paths(
        crate::api::inquiries::send_inquiries,
        crate::api::users::create_user,
        crate::api::users::delete_users,
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::models::Inquiry,
            crate::models::ImportUserRequest,
            crate::models::CreateUserResult,
            crate::models::DeleteUsersResult,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Inquiries", description = "Contact form mails to the management team."),
        (name = "Users", description = "Provisioning and yearly cleanup of survey accounts."),
        (name = "Health", description = "Health check for monitoring."),
    )
)]
pub struct ApiDoc;
