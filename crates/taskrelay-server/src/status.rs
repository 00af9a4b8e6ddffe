use axum::response::Html;

const STATUS_PAGE: &str = r#"<!DOCTYPE html>
<html>
    <head>
        <title>Task Relay</title>
        <style>
            body {
                font-family: 'Arial', sans-serif;
                background-color: #f4f4f4;
                margin: 0;
                display: flex;
                justify-content: center;
                align-items: center;
                height: 100vh;
            }
            .container {
                background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
                border-radius: 10px;
                box-shadow: 0 10px 20px rgba(0, 0, 0, 0.2);
                padding: 50px;
                color: #fff;
                text-align: center;
            }
            h2 { margin-top: 0; }
            ul { list-style: none; padding: 0; }
            li { margin: 10px 0; font-size: 18px; }
        </style>
    </head>
    <body>
        <div class="container">
            <h2>Task Relay</h2>
            <p>Integration between Asana and Airtable</p>
            <ul>
                <li>Add a new task to Asana</li>
                <li>Collect it through the webhook</li>
                <li>Add it to Airtable</li>
            </ul>
        </div>
    </body>
</html>
"#;

/// GET / - static page confirming the server is up
pub async fn status_page() -> Html<&'static str> {
    Html(STATUS_PAGE)
}
