use crate::api::ApiError;

/// One independently loaded piece of page state.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Slot<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    /// The request succeeded but returned nothing worth showing.
    Empty,
    Failed(String),
}

/// Whether a payload has anything to render. Drives the `Ready` / `Empty` split.
pub trait HasData {
    fn has_data(&self) -> bool;
}

impl<T> HasData for Vec<T> {
    fn has_data(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: HasData> Slot<T> {
    pub fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) if value.has_data() => Self::Ready(value),
            Ok(_) | Err(ApiError::NotFound) => Self::Empty,
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}

impl<T> Slot<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_is_not_an_error() {
        let slot: Slot<Vec<u8>> = Slot::from_result(Ok(vec![]));
        assert_eq!(slot, Slot::Empty);

        let slot: Slot<Vec<u8>> = Slot::from_result(Err(ApiError::NotFound));
        assert_eq!(slot, Slot::Empty);
    }

    #[test]
    fn failures_keep_their_message() {
        let slot: Slot<Vec<u8>> = Slot::from_result(Err(ApiError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        }));
        assert!(slot.is_failed());
        assert_eq!(slot, Slot::Failed("HTTP 502: bad gateway".to_string()));
    }

    #[test]
    fn payload_with_data_is_ready() {
        let slot = Slot::from_result(Ok(vec![1, 2]));
        assert_eq!(slot.ready(), Some(&vec![1, 2]));
    }
}
