/// Current UTC timestamp in milliseconds.
///
/// The single instant representation used across the platform: every
/// `created_at` / `seen_at` / `marked_at` column stores this value.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
