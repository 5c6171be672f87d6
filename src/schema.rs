diesel::table! {
    notes (id) {
        id -> Uuid,
        #[max_length = 32]
        slug -> Varchar,
        ciphertext -> Text,
        #[max_length = 64]
        salt -> Varchar,
        #[max_length = 64]
        nonce -> Varchar,
        #[max_length = 255]
        update_secret_hash -> Varchar,
        modification_token -> Int8,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}
