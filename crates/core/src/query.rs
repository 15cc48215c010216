use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Choice, ClientId, Fold, Group, Instrument, PresentationClass, Quality};
use crate::error::{Error, Result};
use crate::filter::{self, Filter};

/// Filter criteria for [`crate::Database::objects`].
///
/// Every dimension left unset matches its whole domain. `classes` is the
/// exception: when it is unset but `instruments` is set, only attacks are
/// selected, since instruments only apply to attacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub ids: Filter<ClientId>,
    pub groups: Filter<Group>,
    pub classes: Filter<PresentationClass>,
    pub qualities: Filter<Quality>,
    pub instruments: Filter<Instrument>,
    pub fold: Filter<Fold>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(mut self, ids: impl Into<Filter<ClientId>>) -> Self {
        self.ids = ids.into();
        self
    }

    pub fn groups(mut self, groups: impl Into<Filter<Group>>) -> Self {
        self.groups = groups.into();
        self
    }

    pub fn classes(mut self, classes: impl Into<Filter<PresentationClass>>) -> Self {
        self.classes = classes.into();
        self
    }

    pub fn qualities(mut self, qualities: impl Into<Filter<Quality>>) -> Self {
        self.qualities = qualities.into();
        self
    }

    pub fn instruments(mut self, instruments: impl Into<Filter<Instrument>>) -> Self {
        self.instruments = instruments.into();
        self
    }

    pub fn fold(mut self, fold: impl Into<Filter<Fold>>) -> Self {
        self.fold = fold.into();
        self
    }

    /// Validate every dimension and apply the default-resolution rules.
    ///
    /// `known_ids` is the client domain of the catalog being queried.
    pub fn resolve(&self, known_ids: &[ClientId], default_fold: Fold) -> Result<ResolvedQuery> {
        if !Fold::ALL.contains(&default_fold) {
            return Err(Error::invalid_value(Fold::PARAM, default_fold, Fold::ALL));
        }
        let class_default: &[PresentationClass] = if self.classes.is_unset() && !self.instruments.is_unset() {
            &[PresentationClass::Attack]
        } else {
            PresentationClass::ALL
        };

        let resolved = ResolvedQuery {
            ids: filter::validate("id", self.ids.clone(), known_ids, &[])?,
            groups: filter::validate(Group::PARAM, self.groups.clone(), Group::ALL, Group::ALL)?,
            classes: filter::validate(
                PresentationClass::PARAM,
                self.classes.clone(),
                PresentationClass::ALL,
                class_default,
            )?,
            qualities: filter::validate(Quality::PARAM, self.qualities.clone(), Quality::ALL, Quality::ALL)?,
            instruments: filter::validate(
                Instrument::PARAM,
                self.instruments.clone(),
                Instrument::ALL,
                Instrument::ALL,
            )?,
            fold: filter::validate_single(Fold::PARAM, self.fold.clone(), Fold::ALL, default_fold)?,
        };
        debug!(?resolved, "query resolved");
        Ok(resolved)
    }
}

/// Untyped criteria as they arrive from a command line or config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuery {
    pub ids: Filter<String>,
    pub groups: Filter<String>,
    pub classes: Filter<String>,
    pub qualities: Filter<String>,
    pub instruments: Filter<String>,
    pub fold: Filter<String>,
}

impl RawQuery {
    /// Parse into a typed [`Query`]. Client ids must parse as numbers;
    /// membership in the catalog is checked later by [`Query::resolve`].
    pub fn parse(self) -> Result<Query> {
        let ids = match self.ids {
            Filter::Unset => Filter::Unset,
            Filter::One(s) => Filter::One(parse_id(&s)?),
            Filter::Many(values) => Filter::Many(values.iter().map(|s| parse_id(s)).collect::<Result<_>>()?),
        };
        Ok(Query {
            ids,
            groups: filter::parse(self.groups)?,
            classes: filter::parse(self.classes)?,
            qualities: filter::parse(self.qualities)?,
            instruments: filter::parse(self.instruments)?,
            fold: filter::parse(self.fold)?,
        })
    }
}

fn parse_id(s: &str) -> Result<ClientId> {
    s.parse().map_err(|_| Error::InvalidFilterValue {
        value: s.to_string(),
        param: "id",
        valid: vec!["a numeric client id such as 01 or client001".to_string()],
    })
}

/// Fully validated criteria: every list is concrete and the fold is a
/// single value. An empty `ids` list means every client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub ids: Vec<ClientId>,
    pub groups: Vec<Group>,
    pub classes: Vec<PresentationClass>,
    pub qualities: Vec<Quality>,
    pub instruments: Vec<Instrument>,
    pub fold: Fold,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<ClientId> {
        vec![ClientId(1), ClientId(2), ClientId(55)]
    }

    #[test]
    fn test_empty_query_expands_to_full_domains() {
        let r = Query::new().resolve(&ids(), Fold::default()).unwrap();
        assert!(r.ids.is_empty());
        assert_eq!(r.groups, Group::ALL);
        assert_eq!(r.classes, PresentationClass::ALL);
        assert_eq!(r.qualities, Quality::ALL);
        assert_eq!(r.instruments, Instrument::ALL);
        assert_eq!(r.fold, Fold::default());
    }

    #[test]
    fn test_instrument_without_class_selects_attacks_only() {
        let r = Query::new()
            .instruments(Instrument::VideoMobile)
            .resolve(&ids(), Fold::default())
            .unwrap();
        assert_eq!(r.classes, vec![PresentationClass::Attack]);
        assert_eq!(r.instruments, vec![Instrument::VideoMobile]);
    }

    #[test]
    fn test_explicit_class_wins_over_instrument_rule() {
        let r = Query::new()
            .classes(PresentationClass::Real)
            .instruments(Instrument::Print)
            .resolve(&ids(), Fold::default())
            .unwrap();
        assert_eq!(r.classes, vec![PresentationClass::Real]);
    }

    #[test]
    fn test_unknown_client_rejected() {
        let err = Query::new()
            .ids(ClientId(4))
            .resolve(&ids(), Fold::default())
            .unwrap_err();
        match err {
            Error::InvalidFilterValue { value, param, valid } => {
                assert_eq!(value, "04");
                assert_eq!(param, "id");
                assert_eq!(valid, vec!["01", "02", "55"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fold_list_rejected() {
        let folds: Vec<Fold> = Fold::ALL[1..3].to_vec();
        let err = Query::new().fold(folds).resolve(&ids(), Fold::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidFilterValue { param: "fold", .. }));
    }

    #[test]
    fn test_raw_query_parse() {
        let raw = RawQuery {
            ids: Filter::Many(vec!["01".into(), "55".into()]),
            groups: Filter::One("devel".into()),
            fold: Filter::One("3".into()),
            ..RawQuery::default()
        };
        let q = raw.parse().unwrap();
        assert_eq!(q.ids, Filter::Many(vec![ClientId(1), ClientId(55)]));
        assert_eq!(q.groups, Filter::One(Group::Devel));
        assert_eq!(q.fold, Filter::One(Fold::ALL[3]));
    }

    #[test]
    fn test_raw_query_rejects_bad_tokens() {
        let raw = RawQuery {
            fold: Filter::One("9".into()),
            ..RawQuery::default()
        };
        assert!(matches!(raw.parse().unwrap_err(), Error::InvalidFilterValue { param: "fold", .. }));

        let raw = RawQuery {
            ids: Filter::One("first".into()),
            ..RawQuery::default()
        };
        assert!(matches!(raw.parse().unwrap_err(), Error::InvalidFilterValue { param: "id", .. }));
    }

    #[test]
    fn test_malformed_id_message_names_expected_form() {
        let raw = RawQuery {
            ids: Filter::One("first".into()),
            ..RawQuery::default()
        };
        let msg = raw.parse().unwrap_err().to_string();
        assert!(msg.contains("invalid id value \"first\""));
        assert!(msg.contains("numeric client id"));
        assert!(!msg.ends_with("valid values are: "));
    }
}
