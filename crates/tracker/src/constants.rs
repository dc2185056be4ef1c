//! Tracker protocol parameter names and Iglu schema URIs.

pub const TRACKER_VERSION_LABEL: &str = concat!("rust-", env!("CARGO_PKG_VERSION"));

// requests
pub const POST_PATH: &str = "com.snowplowanalytics.snowplow/tp2";
pub const POST_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const GET_PATH: &str = "i";

// schemas
pub const SCHEMA_PAYLOAD_DATA: &str =
    "iglu:com.snowplowanalytics.snowplow/payload_data/jsonschema/1-0-4";
pub const SCHEMA_CONTEXTS: &str = "iglu:com.snowplowanalytics.snowplow/contexts/jsonschema/1-0-1";
pub const SCHEMA_UNSTRUCT_EVENT: &str =
    "iglu:com.snowplowanalytics.snowplow/unstruct_event/jsonschema/1-0-0";
pub const SCHEMA_SCREEN_VIEW: &str =
    "iglu:com.snowplowanalytics.snowplow/screen_view/jsonschema/1-0-0";
pub const SCHEMA_USER_TIMINGS: &str = "iglu:com.snowplowanalytics.snowplow/timing/jsonschema/1-0-0";
pub const SCHEMA_CLIENT_SESSION: &str =
    "iglu:com.snowplowanalytics.snowplow/client_session/jsonschema/1-0-2";
pub const SCHEMA_DESKTOP_CONTEXT: &str =
    "iglu:com.snowplowanalytics.snowplow/desktop_context/jsonschema/1-0-0";

// event types
pub const EVENT_STRUCTURED: &str = "se";
pub const EVENT_UNSTRUCTURED: &str = "ue";

pub const CONTEXT: &str = "co";
pub const CONTEXT_ENCODED: &str = "cx";
pub const UNSTRUCTURED: &str = "ue_pr";
pub const UNSTRUCTURED_ENCODED: &str = "ue_px";

// general
pub const SCHEMA: &str = "schema";
pub const DATA: &str = "data";
pub const EVENT: &str = "e";
pub const EID: &str = "eid";
pub const TIMESTAMP: &str = "dtm";
pub const SENT_TIMESTAMP: &str = "stm";
pub const TRUE_TIMESTAMP: &str = "ttm";
pub const TRACKER_VERSION: &str = "tv";
pub const APP_ID: &str = "aid";
pub const NAMESPACE: &str = "tna";
pub const PLATFORM: &str = "p";

// subject
pub const UID: &str = "uid";
pub const RESOLUTION: &str = "res";
pub const VIEWPORT: &str = "vp";
pub const COLOR_DEPTH: &str = "cd";
pub const TIMEZONE: &str = "tz";
pub const LANGUAGE: &str = "lang";
pub const USERAGENT: &str = "ua";
pub const IP_ADDRESS: &str = "ip";

// structured event
pub const SE_CATEGORY: &str = "se_ca";
pub const SE_ACTION: &str = "se_ac";
pub const SE_LABEL: &str = "se_la";
pub const SE_PROPERTY: &str = "se_pr";
pub const SE_VALUE: &str = "se_va";

// screen view
pub const SV_ID: &str = "id";
pub const SV_NAME: &str = "name";

// user timing
pub const UT_CATEGORY: &str = "category";
pub const UT_VARIABLE: &str = "variable";
pub const UT_TIMING: &str = "timing";
pub const UT_LABEL: &str = "label";

// client session context
pub const SESSION_USER_ID: &str = "userId";
pub const SESSION_ID: &str = "sessionId";
pub const SESSION_PREVIOUS_ID: &str = "previousSessionId";
pub const SESSION_INDEX: &str = "sessionIndex";
pub const SESSION_STORAGE: &str = "storageMechanism";
pub const SESSION_FIRST_ID: &str = "firstEventId";
pub const SESSION_FIRST_TIMESTAMP: &str = "firstEventTimestamp";
pub const SESSION_EVENT_INDEX: &str = "eventIndex";

// desktop context
pub const DESKTOP_OS_TYPE: &str = "osType";
pub const DESKTOP_OS_VERSION: &str = "osVersion";
pub const DESKTOP_OS_SERVICE_PACK: &str = "osServicePack";
pub const DESKTOP_OS_IS_64_BIT: &str = "osIs64Bit";
pub const DESKTOP_DEVICE_MANUFACTURER: &str = "deviceManufacturer";
pub const DESKTOP_DEVICE_MODEL: &str = "deviceModel";
pub const DESKTOP_DEVICE_PROCESSOR_COUNT: &str = "deviceProcessorCount";
