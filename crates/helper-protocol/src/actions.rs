//! Known action and event names.

/// Actions the server can ask the helper to perform.
pub mod names {
    pub const REFRESH_FINDMY_FRIENDS: &str = "refresh-findmy-friends";
    pub const GET_HANDLES_CONTACT_INFO: &str = "get-handles-contact-info";
    pub const GET_CONTACT_FOR_HANDLE: &str = "get-contact-for-handle";
    pub const GET_CONTACT_PHOTO: &str = "get-contact-photo";
    pub const BATCH_CHECK_IMESSAGE: &str = "batch-check-imessage";
    pub const GET_HANDLE_SIBLINGS: &str = "get-handle-siblings";
    pub const GET_SUGGESTED_NAMES: &str = "get-suggested-names";
    pub const GET_CONTACT_AVAILABILITY: &str = "get-contact-availability";
    pub const DETECT_BUSINESS_CONTACT: &str = "detect-business-contact";
}

/// Events the helper emits without a matching request.
pub mod events {
    /// Sent once after connecting; carries `message` and `process`.
    pub const PING: &str = "ping";
    /// Real-time friend location updates; `data` is an array of locations.
    pub const NEW_FINDMY_LOCATION: &str = "new-findmy-location";
}
