/// 連番（SERIAL / BIGSERIAL）ベースの ID 型を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（整数をラップ）
/// - `derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)`
/// - `new()`: 既存の値から ID を作成
/// - `as_i64()` / `as_i32()`: 内部値の取得
/// - `From<ID> for 内部型`
///
/// ID の採番はデータベースが行うため、ドメイン側で新規生成する手段は持たない。
///
/// # 使用例
///
/// ```rust
/// use clinic_domain::patient::PatientId;
///
/// let id = PatientId::new(42);
/// assert_eq!(id.as_i64(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
macro_rules! define_serial_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident($Inner:ty) => $getter:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[serde(transparent)]
        #[display("{_0}")]
        $vis struct $Name($Inner);

        impl $Name {
            /// 既存の値から ID を作成する
            pub const fn new(value: $Inner) -> Self {
                Self(value)
            }

            /// 内部の値を取得する
            pub const fn $getter(&self) -> $Inner {
                self.0
            }
        }

        impl From<$Name> for $Inner {
            fn from(id: $Name) -> Self {
                id.0
            }
        }
    };
}
