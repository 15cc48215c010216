use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::domain::{Choice, ClientId, Fold, Group, Instrument, PresentationClass, Quality};
use crate::error::{Error, Result};

/// A caller-supplied filter value: absent, one value, or several.
///
/// `Unset` and an empty `Many` both mean "no restriction".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Filter<T> {
    #[default]
    Unset,
    One(T),
    Many(Vec<T>),
}

impl<T> Filter<T> {
    pub fn one(value: T) -> Self {
        Filter::One(value)
    }

    pub fn is_unset(&self) -> bool {
        match self {
            Filter::Unset => true,
            Filter::One(_) => false,
            Filter::Many(values) => values.is_empty(),
        }
    }
}

macro_rules! scalar_filter {
    ($($ty:ty),*) => {
        $(impl From<$ty> for $crate::filter::Filter<$ty> {
            fn from(value: $ty) -> Self {
                $crate::filter::Filter::One(value)
            }
        })*
    };
}

pub(crate) use scalar_filter;

scalar_filter!(ClientId, Group, PresentationClass, Quality, Instrument, Fold);

impl<T> From<Vec<T>> for Filter<T> {
    fn from(values: Vec<T>) -> Self {
        Filter::Many(values)
    }
}

impl<T: Clone> From<&[T]> for Filter<T> {
    fn from(values: &[T]) -> Self {
        Filter::Many(values.to_vec())
    }
}

impl<T, const N: usize> From<[T; N]> for Filter<T> {
    fn from(values: [T; N]) -> Self {
        Filter::Many(values.into())
    }
}

impl<T> From<Option<Vec<T>>> for Filter<T> {
    fn from(values: Option<Vec<T>>) -> Self {
        values.map_or(Filter::Unset, Filter::Many)
    }
}

/// Normalize a multi-valued filter against its domain.
///
/// Unset falls back to `default`, a scalar is wrapped into a one-element
/// list, and every element of a list must belong to `valid`. Caller order
/// is preserved.
pub fn validate<T>(param: &'static str, value: Filter<T>, valid: &[T], default: &[T]) -> Result<Vec<T>>
where
    T: Clone + PartialEq + Display,
{
    match value {
        Filter::Unset => Ok(default.to_vec()),
        Filter::One(v) => validate(param, Filter::Many(vec![v]), valid, default),
        Filter::Many(values) if values.is_empty() => Ok(default.to_vec()),
        Filter::Many(values) => {
            if let Some(bad) = values.iter().find(|v| !valid.contains(v)) {
                return Err(Error::invalid_value(param, bad, valid));
            }
            Ok(values)
        }
    }
}

/// Normalize a filter that must select exactly one member of its domain.
pub fn validate_single<T>(param: &'static str, value: Filter<T>, valid: &[T], default: T) -> Result<T>
where
    T: Clone + PartialEq + Display,
{
    match value {
        Filter::Unset => Ok(default),
        Filter::Many(values) if values.is_empty() => Ok(default),
        Filter::One(v) if valid.contains(&v) => Ok(v),
        Filter::One(v) => Err(Error::invalid_value(param, v, valid)),
        Filter::Many(values) => {
            let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            Err(Error::invalid_value(
                param,
                format!("[{}] (exactly one value expected)", rendered.join(", ")),
                valid,
            ))
        }
    }
}

/// Convert raw string input into a typed filter of an enumerated dimension.
pub fn parse<T: Choice>(raw: Filter<String>) -> Result<Filter<T>> {
    let token = |s: &str| T::from_token(s).ok_or_else(|| Error::invalid_value(T::PARAM, s, T::ALL));
    Ok(match raw {
        Filter::Unset => Filter::Unset,
        Filter::One(s) => Filter::One(token(s.as_str())?),
        Filter::Many(values) => Filter::Many(
            values
                .iter()
                .map(|s| token(s.as_str()))
                .collect::<Result<Vec<_>>>()?,
        ),
    })
}
