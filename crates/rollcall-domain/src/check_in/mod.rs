mod classification;
mod provider;
mod value_objects;

pub use classification::{classify_check_in_response, ClassifiedResponse, ResponseClass};
pub use provider::{BypassMethod, Provider};
pub use value_objects::{convert_quota, format_amount, UserInfo, QUOTA_SCALE};
