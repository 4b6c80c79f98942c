#![allow(dead_code)]

pub mod fake_nitb;

pub use fake_nitb::FakeNitb;

use calypso_core::SubscriberId;
use calypso_hlr::SubscriberRecord;

pub fn record(id: u64, imsi: &str, number: Option<&str>) -> SubscriberRecord {
    SubscriberRecord {
        id: SubscriberId::new(id).unwrap(),
        imsi: imsi.to_string(),
        number: number.map(str::to_string),
        imei: None,
        tmsi: None,
        created: None,
    }
}
