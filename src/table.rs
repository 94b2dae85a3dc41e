//! Ordered field table.

use crate::bstr::Bstr;

/// An insertion-ordered table of `(name, element)` pairs with
/// case-insensitive lookup. Header and trailer collections use
/// `Table<Bstr>`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table<T> {
    elements: Vec<(Bstr, T)>,
}

impl<T> Table<T> {
    /// Makes a new owned table with the given capacity.
    pub fn with_capacity(size: usize) -> Self {
        Self {
            elements: Vec::with_capacity(size),
        }
    }

    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    /// Adds a `(key, element)` pair to the table.
    pub fn add(&mut self, key: Bstr, element: T) {
        self.elements.push((key, element));
    }

    pub fn get(&self, index: usize) -> Option<&(Bstr, T)> {
        self.elements.get(index)
    }

    /// First pair whose key matches, ignoring ASCII case.
    pub fn get_nocase<K: AsRef<[u8]>>(&self, key: K) -> Option<&(Bstr, T)> {
        self.elements.iter().find(|(k, _)| k.eq_nocase(key.as_ref()))
    }

    /// First pair whose key matches, ignoring ASCII case, mutable.
    pub fn get_nocase_mut<K: AsRef<[u8]>>(&mut self, key: K) -> Option<&mut (Bstr, T)> {
        self.elements
            .iter_mut()
            .find(|(k, _)| k.eq_nocase(key.as_ref()))
    }

    pub fn size(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<(Bstr, T)> {
        self.elements.iter()
    }

    pub fn clear(&mut self) {
        self.elements.clear()
    }
}

impl<'a, T> IntoIterator for &'a Table<T> {
    type Item = &'a (Bstr, T);
    type IntoIter = std::slice::Iter<'a, (Bstr, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<T> IntoIterator for Table<T> {
    type Item = (Bstr, T);
    type IntoIter = std::vec::IntoIter<(Bstr, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_and_size() {
        let mut t = Table::with_capacity(1);
        assert_eq!(0, t.size());
        t.add(Bstr::from("Host"), "example.com");
        assert_eq!(1, t.size());
        t.add(Bstr::from("Accept"), "*/*");
        assert_eq!(2, t.size());
        assert_eq!(t.get(1).unwrap().1, "*/*");
    }

    #[test]
    fn get_nocase() {
        let mut t = Table::with_capacity(2);
        t.add(Bstr::from("Content-Length"), "10");
        t.add(Bstr::from("transfer-ENCODING"), "chunked");

        let (key, value) = t.get_nocase("content-length").unwrap();
        assert_eq!(*key, "Content-Length");
        assert_eq!(*value, "10");

        let (key, value) = t.get_nocase("Transfer-Encoding").unwrap();
        assert_eq!(*key, "transfer-ENCODING");
        assert_eq!(*value, "chunked");

        assert!(t.get_nocase("Host").is_none());
    }

    #[test]
    fn iterators() {
        let mut t = Table::new();
        t.add(Bstr::from("a"), 1);
        t.add(Bstr::from("b"), 2);
        let keys: Vec<_> = t.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![Bstr::from("a"), Bstr::from("b")]);
        let sum: i32 = t.into_iter().map(|(_, v)| v).sum();
        assert_eq!(sum, 3);
    }
}
