table! {
    courses (id) {
        id -> Integer,
        name -> Text,
        teacher_id -> Integer,
        schedule -> Text,
        capacity -> Integer,
    }
}

table! {
    enrollments (id) {
        id -> Integer,
        user_id -> Integer,
        course_id -> Integer,
        enrolled_at -> Timestamp,
    }
}

table! {
    grades (id) {
        id -> Integer,
        course_id -> Integer,
        user_id -> Integer,
        score -> Integer,
        updated_at -> Timestamp,
    }
}

table! {
    users (id) {
        id -> Integer,
        username -> Text,
        secret_hash -> Text,
        is_admin -> Bool,
        joined_at -> Timestamp,
    }
}

joinable!(courses -> users (teacher_id));
joinable!(enrollments -> courses (course_id));
joinable!(enrollments -> users (user_id));
joinable!(grades -> courses (course_id));
joinable!(grades -> users (user_id));

allow_tables_to_appear_in_same_query!(courses, enrollments, grades, users,);
