//! Browser form snapshot in submission order.

use std::fmt;
use std::ops::Index;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Field name to every submitted value, in the order the browser reported the
/// fields. Serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot(Vec<(String, Vec<String>)>);

impl FormSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the values of `name`. A new field goes last; an existing one keeps its place.
    pub fn insert(&mut self, name: String, values: Vec<String>) {
        match self.0.iter_mut().find(|(field, _)| *field == name) {
            Some((_, existing)) => *existing = values,
            None => self.0.push((name, values)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Vec<String>> {
        self.0
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, values)| values)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter().map(|(name, values)| (name, values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<&str> for FormSnapshot {
    type Output = Vec<String>;

    fn index(&self, name: &str) -> &Self::Output {
        match self.get(name) {
            Some(values) => values,
            None => panic!("form field {name} not present"),
        }
    }
}

impl FromIterator<(String, Vec<String>)> for FormSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut form = FormSnapshot::new();
        for (name, values) in iter {
            form.insert(name, values);
        }
        form
    }
}

impl Serialize for FormSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for FormSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FormVisitor;

        impl<'de> Visitor<'de> for FormVisitor {
            type Value = FormSnapshot;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of field name to string or array of strings")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut form = FormSnapshot::new();
                while let Some((name, value)) = map.next_entry::<String, serde_json::Value>()? {
                    let values = match value {
                        serde_json::Value::String(s) => vec![s],
                        serde_json::Value::Array(items) => items
                            .into_iter()
                            .map(|item| match item {
                                serde_json::Value::String(s) => Ok(s),
                                other => Err(de::Error::invalid_type(
                                    de::Unexpected::Other(&other.to_string()),
                                    &self,
                                )),
                            })
                            .collect::<Result<_, _>>()?,
                        _ => {
                            return Err(de::Error::invalid_type(
                                de::Unexpected::Other("expected string or array"),
                                &self,
                            ));
                        }
                    };
                    form.insert(name, values);
                }
                Ok(form)
            }
        }

        deserializer.deserialize_map(FormVisitor)
    }
}
