pub const DATE_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub mod serializer {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde::de::Error;
    use crate::utils::date::DATE_FMT;

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        time.format(DATE_FMT).to_string().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let str_time: String = Deserialize::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&str_time, DATE_FMT).map_err(D::Error::custom)
    }
}

pub mod opt_serializer {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde::de::Error;
    use crate::utils::date::DATE_FMT;

    pub fn serialize<S: Serializer>(time: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
        time.map(|t| t.format(DATE_FMT).to_string()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
        let str_time: Option<String> = Deserialize::deserialize(deserializer)?;
        match str_time {
            Some(s) if !s.is_empty() => {
                NaiveDateTime::parse_from_str(&s, DATE_FMT).map(Some).map_err(D::Error::custom)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Serialize};
    use crate::utils::date::{opt_serializer, serializer, DATE_FMT};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stamped {
        #[serde(with = "serializer")]
        at: NaiveDateTime,
        #[serde(with = "opt_serializer")]
        until: Option<NaiveDateTime>,
    }

    #[tokio::test]
    async fn test_should_keep_dates_in_storage_format() {
        let at = NaiveDateTime::parse_from_str("2023-04-11T11:11:11.25", DATE_FMT).unwrap();
        let stamped = Stamped { at, until: None };
        let json = serde_json::to_string(&stamped).unwrap();
        assert!(json.contains("\"at\":\"2023-04-11T11:11:11.25"));
        assert!(json.contains("\"until\":null"));
        let parsed: Stamped = serde_json::from_str(json.as_str()).unwrap();
        assert_eq!(stamped, parsed);
        let blank: Stamped = serde_json::from_str(r#"{"at":"2023-04-11T11:11:11.25","until":""}"#).unwrap();
        assert_eq!(None, blank.until);
    }
}
