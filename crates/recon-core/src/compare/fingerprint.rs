const NULL_MARKER: char = '~';

/// Encodes one row as a single string usable for set membership.
///
/// Each value is written as `<byte-length>:<value>` and a null as `~`. A length
/// prefix never starts with `~`, so nulls and values cannot be confused, and the
/// prefix tells the reader exactly where a value ends. Two rows therefore share a
/// fingerprint only when they have the same values in the same columns, whatever
/// characters the values contain.
pub fn fingerprint<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut out = String::new();
    for value in values {
        match value {
            Some(value) => {
                out.push_str(&value.len().to_string());
                out.push(':');
                out.push_str(value);
            }
            None => out.push(NULL_MARKER),
        }
    }
    out
}
