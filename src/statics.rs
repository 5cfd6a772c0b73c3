// Central place for user-facing strings and record keys the editing core depends on.
// Keep these out of the surfaces to reduce duplication and make tweaks safer.

// Record keys (REC_ prefix)
pub const REC_FIELD_ID: &str = "id";
pub const REC_FIELD_ORDER_INDEX: &str = "order_index";
pub const REC_FIELD_NAME: &str = "name";
pub const REC_FIELD_DESCRIPTION: &str = "description";
pub const REC_FIELD_MATERIAL_COMPOSITION: &str = "material_composition";
pub const REC_FIELD_HS_CODE: &str = "hs_code";
pub const REC_FIELD_UNIT_PRICE: &str = "unit_price";

// Nested groups inside product records.
pub const REC_GROUP_QUALITY_SPECS: &str = "quality_specs";
pub const REC_GROUP_DIMENSIONS: &str = "dimensions_l_w_h";
pub const REC_DIMENSION_LENGTH: &str = "length";
pub const REC_DIMENSION_WIDTH: &str = "width";
pub const REC_DIMENSION_HEIGHT: &str = "height";

// Entity names as the console addresses them.
pub const ENTITY_PRODUCT: &str = "product";
pub const ENTITY_MODULE: &str = "module";
pub const ENTITY_BUYER_REQUEST: &str = "buyer_request";

// Response envelope keys (API_ prefix)
pub const API_SUCCESS: &str = "success";
pub const API_DATA: &str = "data";
pub const API_RESULTS: &str = "results";
pub const API_COUNT: &str = "count";
pub const API_ERROR: &str = "error";
pub const API_DETAIL: &str = "detail";
pub const API_MESSAGE: &str = "message";
pub const API_ERRORS: &str = "errors";
pub const API_NON_FIELD_ERRORS: &str = "non_field_errors";

// Compliance report keys.
pub const API_ISSUES: &str = "issues";
pub const API_ISSUE_FIELD: &str = "field";
pub const API_ISSUE_LABEL: &str = "label";
pub const API_ISSUE_KIND: &str = "kind";
pub const API_ISSUE_SUGGESTION: &str = "suggestion";

// Default list page size for directory and module lists.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

// English UI strings (EN_ prefix to make future localization easier)
pub const EN_ERR_NOT_FOUND: &str = "The requested record could not be found.";
pub const EN_ERR_UNAUTHORIZED: &str = "Your session has expired. Please sign in again.";
pub const EN_ERR_FORBIDDEN: &str = "You do not have permission to perform this action.";
pub const EN_ERR_NETWORK: &str = "Network error";
pub const EN_ERR_REQUEST_FAILED: &str = "Request failed";
pub const EN_ERR_REORDER_FAILED: &str = "Failed to reorder modules. The list has been reloaded.";
pub const EN_ERR_REORDER_RELOAD_FAILED: &str =
    "Failed to reload modules. The previous order has been restored.";
pub const EN_ERR_DELETE_FAILED: &str = "Failed to delete";
pub const EN_ERR_NO_SESSION: &str = "No editor is open";
pub const EN_ERR_SURFACE_CLOSED: &str = "The editor was closed before the request finished";

pub const EN_STATUS_SAVED: &str = "Changes saved";
pub const EN_STATUS_NOTHING_TO_SAVE: &str = "No changes to save";
pub const EN_STATUS_DELETED: &str = "Deleted";

pub const EN_EMPTY: &str = "";
pub const EN_ZERO: &str = "0";
