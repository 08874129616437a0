use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    auth_routes().merge(upload_routes()).merge(public_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::signup))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::oauth_callback))
        .routes(routes!(handlers::auth::oauth_username))
        .routes(routes!(handlers::auth::me))
}

fn upload_routes() -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(handlers::upload::history))
        .routes(routes!(
            handlers::upload::rename_upload,
            handlers::upload::delete_upload
        ));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::upload::upload))
        .layer(handlers::upload::upload_body_limit());

    crud.merge(upload)
}

fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::share::get_share))
        .routes(routes!(handlers::share::gallery))
}
