// `id` is declared BigInt by hand so row ids map to i64.

diesel::table! {
    readings (id) {
        id -> BigInt,
        weight -> Double,
        created_at -> Text,
    }
}
