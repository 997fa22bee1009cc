use utoipa::OpenApi;

#[derive(utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(utoipa::ToSchema)]
pub struct AddCoinInput {
    pub coin: String,
}

#[derive(utoipa::ToSchema)]
pub struct ReplaceCoinsInput {
    pub coins: Vec<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::coins::get_coins,
        crate::routes::coins::add_coin,
        crate::routes::coins::replace_coins,
    ),
    components(
        schemas(
            HealthResponse,
            AddCoinInput,
            ReplaceCoinsInput,
            crate::routes::coins::CoinsResponse,
        )
    ),
    tags(
        (name = "health"),
        (name = "coins")
    )
)]
pub struct ApiDoc;
