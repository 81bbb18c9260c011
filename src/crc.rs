//! crc — rolling CRC-32 медиа-формата.
//!
//! Вариант: reflected poly 0xEDB88320, init 0xFFFFFFFF, БЕЗ финального xor.
//! Состояние — «сырой» сдвиговый регистр; он же сохраняется на носителе
//! (big-endian). Функция рестартуемая: один логический CRC считается по
//! трём раздельным буферам (header-без-crc, key, data) без конкатенации.
//!
//! crc32fast отдаёт стандартный CRC-32 (с финальным xor), поэтому на входе
//! и выходе конвертируем между доменом регистра и доменом finalized-значений:
//! raw = finalized ^ 0xFFFFFFFF.

use crc32fast::Hasher as Crc32;

use crate::consts::INITIAL_CRC;

/// Продолжить расчёт CRC от состояния `state` по байтам `bytes`.
#[inline]
pub fn crc32_update(state: u32, bytes: &[u8]) -> u32 {
    let mut hasher = Crc32::new_with_initial(state ^ 0xFFFF_FFFF);
    hasher.update(bytes);
    hasher.finalize() ^ 0xFFFF_FFFF
}

/// CRC записи: header (без поля crc) + key + data одним прогоном.
#[inline]
pub fn crc32_of_record_parts(hdr_without_crc: &[u8], key: &[u8], data: &[u8]) -> u32 {
    let crc = crc32_update(INITIAL_CRC, hdr_without_crc);
    let crc = crc32_update(crc, key);
    crc32_update(crc, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Known answer: стандартный CRC-32("123456789") = 0xCBF43926;
    // наш вариант без финального xor = 0xCBF43926 ^ 0xFFFFFFFF.
    #[test]
    fn known_answer_no_final_xor() {
        let crc = crc32_update(INITIAL_CRC, b"123456789");
        assert_eq!(crc, 0xCBF4_3926 ^ 0xFFFF_FFFF);
    }

    #[test]
    fn rolling_equals_whole() {
        let whole = crc32_update(INITIAL_CRC, b"abcdefgh");
        let rolled = crc32_update(crc32_update(INITIAL_CRC, b"abcd"), b"efgh");
        assert_eq!(whole, rolled);

        let parts = crc32_of_record_parts(b"ab", b"cd", b"efgh");
        assert_eq!(whole, parts);
    }

    #[test]
    fn empty_input_keeps_state() {
        assert_eq!(crc32_update(INITIAL_CRC, &[]), INITIAL_CRC);
        let mid = crc32_update(INITIAL_CRC, b"xyz");
        assert_eq!(crc32_update(mid, &[]), mid);
    }
}
