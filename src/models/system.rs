use chrono::NaiveDateTime;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Health {
    pub status: String,
    pub timestamp: NaiveDateTime,
}
