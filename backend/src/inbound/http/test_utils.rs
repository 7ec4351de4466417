//! Test helpers for HTTP handlers: mock-backed state and auth headers.

use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::web;

use crate::domain::Actor;
use crate::domain::ports::{
    MockAccounts, MockLocationIngest, MockLocationPublisher, MockLocationQuery,
};
use crate::inbound::http::state::HttpState;

/// `Authorization` header tuple for `TestRequest::insert_header`.
pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

/// Builder assembling [`HttpState`] from mocks.
#[derive(Default)]
pub struct StateBuilder {
    accounts: MockAccounts,
    ingest: MockLocationIngest,
    locations: MockLocationQuery,
    publisher: MockLocationPublisher,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as identifying `actor`, any number of times.
    pub fn authenticating(mut self, token: &str, actor: Actor) -> Self {
        let token = token.to_owned();
        self.accounts
            .expect_authenticate()
            .withf(move |candidate| candidate == token)
            .returning(move |_| Ok(actor));
        self
    }

    pub fn accounts(mut self, configure: impl FnOnce(&mut MockAccounts)) -> Self {
        configure(&mut self.accounts);
        self
    }

    pub fn ingest(mut self, configure: impl FnOnce(&mut MockLocationIngest)) -> Self {
        configure(&mut self.ingest);
        self
    }

    pub fn locations(mut self, configure: impl FnOnce(&mut MockLocationQuery)) -> Self {
        configure(&mut self.locations);
        self
    }

    pub fn publisher(mut self, configure: impl FnOnce(&mut MockLocationPublisher)) -> Self {
        configure(&mut self.publisher);
        self
    }

    pub fn build(self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(
            Arc::new(self.accounts),
            Arc::new(self.ingest),
            Arc::new(self.locations),
            Arc::new(self.publisher),
        ))
    }
}
