pub mod waitlist;
pub mod waitlist_analytics;
pub mod waitlist_entry;

pub use waitlist::Entity as WaitlistEntity;
pub use waitlist_analytics::Entity as WaitlistAnalyticsEntity;
pub use waitlist_entry::Entity as WaitlistEntryEntity;
