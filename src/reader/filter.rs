/// Binary substring predicate over a raw message payload.
///
/// An empty filter matches everything. A non-empty filter requires an
/// exact, case-sensitive byte-for-byte substring match in the raw
/// (pre-decode) payload, so it can hit field names, values, or any part of
/// the serialized form. A message with no payload matches only the empty
/// filter.
pub fn matches_filter(value: &[u8], filter: &[u8]) -> bool {
    if filter.is_empty() {
        return true;
    }
    if value.is_empty() {
        return false;
    }
    value.windows(filter.len()).any(|window| window == filter)
}
