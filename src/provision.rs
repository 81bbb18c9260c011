//! provision — offline-подготовка readonly-области (host-side).
//!
//! Readonly-записи создаются только на этапе производства: хост собирает
//! образ (master record "PDBS" + N записей) и программирует его в банк 0 до
//! первого mount. В рантайме эта область не мутируется.

use anyhow::{bail, ensure, Context, Result};

use crate::consts::{MASTER_DATA_SIZE, MASTER_KEY, MAX_DATA_SIZE};
use crate::endian::HostEndian;
use crate::media::Bank;
use crate::record::encode_record;
use crate::store::kv::validate_key;

/// Собрать образ readonly-области: master record + записи в порядке подачи.
pub fn build_readonly_image(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    ensure!(
        entries.len() <= u16::MAX as usize,
        "too many readonly entries: {}",
        entries.len()
    );

    let endian = HostEndian::detect();

    let mut count = [0u8; MASTER_DATA_SIZE];
    endian.write_u16(&mut count, entries.len() as u16);
    let mut image = encode_record(&endian, MASTER_KEY.as_bytes(), &count, 0);

    for (key, data) in entries {
        if validate_key(key).is_err() {
            bail!("invalid readonly key {:?}", key);
        }
        ensure!(
            data.len() <= MAX_DATA_SIZE,
            "readonly value for {:?} too large: {} bytes",
            key,
            data.len()
        );
        image.extend_from_slice(&encode_record(&endian, key.as_bytes(), data, 0));
    }
    Ok(image)
}

/// Запрограммировать readonly-образ в начало банка (после start_offset).
/// Банк в этом месте должен быть стёрт. Возвращает длину образа.
pub fn provision_readonly(bank: &mut Bank, entries: &[(&str, &[u8])]) -> Result<u32> {
    let image = build_readonly_image(entries)?;
    ensure!(
        image.len() as u32 <= bank.usable_size(),
        "readonly image ({} bytes) does not fit the bank (usable {})",
        image.len(),
        bank.usable_size()
    );
    bank.program(0, &image)
        .context("program readonly image into bank")?;
    Ok(image.len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::REC_HDR_SIZE;

    #[test]
    fn image_layout() {
        let image = build_readonly_image(&[("key1", b"abc"), ("k2", b"")]).unwrap();
        // master(8+4+2) + key1(8+4+3) + k2(8+2+0)
        assert_eq!(image.len(), (REC_HDR_SIZE + 4 + 2) + (REC_HDR_SIZE + 4 + 3) + (REC_HDR_SIZE + 2));
        // master: data_size=2 BE, key_size=4, ключ "PDBS", счётчик 2 BE
        assert_eq!(&image[..3], &[0x00, 0x02, 0x04]);
        assert_eq!(&image[REC_HDR_SIZE..REC_HDR_SIZE + 4], b"PDBS");
        assert_eq!(&image[REC_HDR_SIZE + 4..REC_HDR_SIZE + 6], &[0x00, 0x02]);
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(build_readonly_image(&[("bad key", b"x")]).is_err());
        assert!(build_readonly_image(&[("", b"x")]).is_err());
    }
}
