use gpfinder_core::{Catchment, Postcode};

/// Classifies whether `origin` falls in a surgery's catchment.
///
/// A postcode-prefix list published by the surgery decides the answer when
/// present. Otherwise the search page's catchment listing is used. With
/// neither, the answer is [`Catchment::Unknown`].
#[must_use]
pub fn classify(
    origin: &Postcode,
    declared_prefixes: Option<&[String]>,
    listed_in_catchment: Option<bool>,
) -> Catchment {
    match declared_prefixes {
        Some(prefixes) if !prefixes.is_empty() => {
            if prefixes.iter().any(|p| origin.matches_prefix(p)) {
                Catchment::Inside
            } else {
                Catchment::Outside
            }
        }
        _ => Catchment::from_flag(listed_in_catchment),
    }
}
