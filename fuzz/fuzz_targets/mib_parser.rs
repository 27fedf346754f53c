#![no_main]

use libfuzzer_sys::fuzz_target;
use mibtrap_mib_catalog::MibCatalog;

fuzz_target!(|data: &[u8]| {
    // 파일 로더와 같은 방식으로 UTF-8 대체 후 파싱
    let text = String::from_utf8_lossy(data);

    if let Ok(catalog) = MibCatalog::parse(&text) {
        // 성공했다면 모든 레코드가 자기 id로 조회되어야 한다
        for record in catalog.iter() {
            assert_eq!(catalog.get(record.id), Some(record));
        }
        assert!(!catalog.is_empty());
    }
});
