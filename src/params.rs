/// Ordered name/value pairs used for query strings and form bodies.
///
/// Order is preserved and duplicate names are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair and returns the list, for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.push(name, value);
        self
    }

    /// Appends a pair only when `value` is present.
    pub fn with_opt<V: ToString>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.push(name, value);
        }
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl ToString) {
        self.0.push((name.into(), value.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }

    /// Removes every pair named `name`, returning the value of the last one.
    pub(crate) fn take(&mut self, name: &str) -> Option<String> {
        let mut taken = None;
        self.0.retain(|(key, value)| {
            if key == name {
                taken = Some(value.clone());
                false
            } else {
                true
            }
        });
        taken
    }
}

impl From<()> for Params {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Vec<(String, String)>> for Params {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a (String, String);
    type IntoIter = std::slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::Params;

    #[test]
    fn keeps_order_and_duplicates() {
        let params = Params::new().with("a", "1").with("b", 2).with("a", "3");
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2"), ("a", "3")]);
    }

    #[test]
    fn with_opt_skips_none() {
        let params = Params::new()
            .with_opt("startAt", Some(10))
            .with_opt::<u32>("maxResults", None);
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("startAt"), Some("10"));
    }

    #[test]
    fn take_removes_all_matches() {
        let mut params: Params = [("jwt", "x"), ("reason", "r"), ("jwt", "y")].into();
        assert_eq!(params.take("jwt"), Some("y".to_owned()));
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("jwt"), None);
    }
}
