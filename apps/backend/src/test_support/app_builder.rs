//! Given an `AppState`, build an initialized actix test service wrapped in
//! the production middleware.

use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::web::{self, ServiceConfig};
use actix_web::{App, Error as ActixError};

use crate::middleware::{RequestTrace, StructuredLogger, TraceSpan};
use crate::state::app_state::AppState;

type RoutesFn = Box<dyn FnOnce(&mut ServiceConfig) + Send>;

pub fn create_test_app_builder(state: AppState) -> TestAppBuilder {
    TestAppBuilder {
        state,
        routes: None,
    }
}

/// Production routes over `state`.
pub async fn create_test_app(
    state: AppState,
) -> impl Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = ActixError> {
    create_test_app_builder(state).build().await
}

pub struct TestAppBuilder {
    state: AppState,
    routes: Option<RoutesFn>,
}

impl TestAppBuilder {
    /// Replace the production routes, e.g. to mount a bare test handler.
    pub fn with_routes<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut ServiceConfig) + Send + 'static,
    {
        self.routes = Some(Box::new(f));
        self
    }

    pub async fn build(
        self,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse<BoxBody>, Error = ActixError>
    {
        let app = App::new()
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(web::Data::new(self.state));

        let app = match self.routes {
            Some(f) => app.configure(f),
            None => app.configure(crate::routes::configure),
        };

        actix_web::test::init_service(app).await
    }
}
