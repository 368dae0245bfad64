use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Debug)]
pub struct MonthQuery {
    pub month: String,
    #[serde(rename = "pageNum")]
    pub page_num: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
}

#[derive(Deserialize, Debug)]
pub struct DailyCashResponse {
    #[serde(rename = "rtCode")]
    pub rt_code: i64,
    #[serde(rename = "rtMsg", default)]
    pub rt_msg: Option<String>,
    #[serde(default)]
    pub content: Option<DailyCashContent>,
}

/// Items stay untyped so one malformed draw cannot sink the whole month.
#[derive(Deserialize, Debug, Default)]
pub struct DailyCashContent {
    #[serde(rename = "daily539Res", default)]
    pub daily539_res: Vec<Value>,
}

#[derive(Deserialize, Debug)]
pub struct RawDraw {
    #[serde(rename = "lotteryDate")]
    pub lottery_date: String,
    pub period: Value,
    #[serde(rename = "drawNumberAppear")]
    pub draw_number_appear: Vec<i64>,
}

/// One row of the persisted table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DrawRow {
    pub draw: String,
    pub date: String,
    pub ad_date: String,
    pub numbers: String,
    pub price: u64,
    pub lottery_type: String,
}
