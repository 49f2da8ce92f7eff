/// 商品の販売可否ルール
/// 在庫数から販売可否を導出する純粋関数。在庫が変わるたびに評価される
pub fn availability(stock: u32) -> bool {
    stock > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_stock_is_unavailable() {
        assert!(!availability(0));
    }

    #[test]
    fn test_positive_stock_is_available() {
        assert!(availability(1));
        assert!(availability(u32::MAX));
    }
}
