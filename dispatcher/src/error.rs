use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    #[error("route {name} already has a receiver")]
    RouteAlreadyRegistered { name: &'static str },
    #[error("route {name} has no receiver")]
    RouteNotRegistered { name: &'static str },
    #[error("receiver of route {name} dropped the request without responding")]
    RequestDropped { name: &'static str },
}
