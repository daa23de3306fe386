/// A session row as PostgREST returns it for `select=*`, including the
/// numeric primary key the client never reads.
pub fn session_row_fixture() -> &'static str {
    return r#"
[
    {
        "id": 42,
        "user_id": "u1",
        "session_id": "session_older",
        "title": "What are the hostel fees?",
        "messages": [
            {
                "text": "What are the hostel fees?",
                "sender": "user",
                "timestamp": "2025-02-01T10:00:00.000Z"
            },
            {
                "text": "Hostel fees depend on the room type.",
                "sender": "bot",
                "timestamp": "2025-02-01T10:00:02.000Z"
            }
        ],
        "created_at": "2025-02-01T10:00:00+00:00",
        "updated_at": "2025-02-01T10:00:02+00:00"
    },
    {
        "id": 43,
        "user_id": "u1",
        "session_id": "session_untitled",
        "title": null,
        "messages": [],
        "created_at": "2025-01-01T09:00:00+00:00",
        "updated_at": "2025-01-01T09:00:00+00:00"
    }
]
"#
    .trim();
}

pub fn long_question_fixture() -> &'static str {
    return "How do I apply for the B.E. Computer Science programme as an international student?";
}
