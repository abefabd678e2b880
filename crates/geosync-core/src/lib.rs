//! Core types for live position sync: records, wire events, coordinate
//! bounds and bearer token validation.

pub mod bounds;
pub mod models;
pub mod token;

pub use bounds::CoordinateBounds;
pub use models::{
    ClientFrame, ErrorPayload, InboundFrame, LocationBroadcast, LocationUpdate, PositionRecord,
    ServerEvent, EVENT_ERROR, EVENT_UPDATE_LOCATION, EVENT_USER_LOCATION_UPDATE,
};
pub use token::{issue_token, Claims, TokenError, TokenValidator};
