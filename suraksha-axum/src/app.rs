use axum::{http::HeaderName, routing::get, Router};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::REQUEST_ID_HEADER;
use crate::rest::story_router;
use crate::uploads::upload_router;
use crate::ApiState;

#[derive(Clone)]
pub struct AxumApp {
    pub state: ApiState,
    pub router: Router<()>,
}

impl AxumApp {
    pub fn new(state: ApiState) -> Self {
        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

        let router = Router::new()
            .route("/health", get(|| async { "ok" }))
            .merge(story_router())
            .merge(upload_router())
            .with_state(state.clone())
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id)),
            );

        Self { state, router }
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

pub fn axum(state: ApiState) -> AxumApp {
    AxumApp::new(state)
}
